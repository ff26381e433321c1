pub mod motion_sm;
pub mod origin_sm;
