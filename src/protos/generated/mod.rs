mod shalekv;

pub use self::shalekv::*;
