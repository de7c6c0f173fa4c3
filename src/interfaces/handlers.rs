pub mod home;
pub mod leads;
pub mod system;
