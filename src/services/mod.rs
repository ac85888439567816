pub mod geocoder;
pub mod simulation;
pub mod tariff;
pub mod trip_store;
