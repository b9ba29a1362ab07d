pub mod alternatives;
pub mod analysis;
pub mod comfort;
pub mod geocode;
pub mod holidays;
pub mod hourly;
pub mod nasa_power;
pub mod statistics;
pub mod trend;
