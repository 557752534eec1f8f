pub mod types;
pub mod registry;
pub mod quantity;
pub mod system;
pub mod context;
pub mod display;
pub mod labels;
pub mod si;

pub use types::*;
pub use registry::{Registry, Unit, UnitDefinition};
pub use quantity::Quantity;
pub use system::{RoleTable, System, Systems, SystemsDefinition};
pub use context::{Groups, UnitContext};
pub use display::Rendered;
pub use si::SiQuantity;
