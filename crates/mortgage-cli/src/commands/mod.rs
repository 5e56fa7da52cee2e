pub mod mortgage;
pub mod renewal;
