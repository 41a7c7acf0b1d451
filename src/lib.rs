pub mod decode;
pub mod forward;
pub mod frame;
pub mod link;
pub mod noise;
pub mod packet;
pub mod pipeline;
pub mod reading;
