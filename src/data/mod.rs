pub mod bar;
pub mod loader;
pub mod series;

pub use bar::{round_cents, Bar, DataError};
pub use loader::{load_csv, read_csv};
pub use series::BarSeries;
