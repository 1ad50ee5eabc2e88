//! Vehicle Enquiry command-line client — flag resolution and output rendering
//! shared by the `vehicle-enquiry` binary.

pub mod output;
pub mod settings;
