pub mod crossing;
pub mod encoder;
pub mod index;
pub mod scheduler;
pub mod table;

pub use crossing::{CrossingState, FrontSweep};
pub use encoder::EncodedBuffer;
pub use index::IndexSpace;
pub use scheduler::{ActiveFront, WavefrontSchedule};
pub use table::{sieve, PrimeTable};
