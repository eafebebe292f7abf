pub mod rotator;
