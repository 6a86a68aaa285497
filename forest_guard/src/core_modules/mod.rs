pub mod change_mask;
pub mod frame;
pub mod pixel;
pub mod smart_pixel;
pub mod utils;
