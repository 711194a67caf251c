pub mod reading;
pub mod writing;

pub use reading::U8ReadStream;
pub use writing::U8WriteStream;
