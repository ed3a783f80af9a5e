pub mod measurement;
pub mod outlet;
pub mod schedule;
pub mod sensor;

pub use measurement::{Measurement, MeasurementType};
pub use outlet::{ActuationError, Actuator, Outlet, OutletState};
pub use schedule::Schedule;
pub use sensor::{Family, Sensor, Subtype, TagSet};
