//! `skillsgarden-beacons`: proximity beacons and per-user scan logs.

pub mod beacon;

pub use beacon::{Beacon, BeaconLog, BeaconPatch, NewBeacon, NewBeaconLog};
