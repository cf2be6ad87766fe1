mod nor_flash;

pub use nor_flash::{NorFlashDriver, NorFlashDriverError};
