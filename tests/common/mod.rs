pub mod synthetic_event;
