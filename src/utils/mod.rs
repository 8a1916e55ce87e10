pub mod jwt;
pub mod reference_code;
pub mod trip_date;
pub mod validation;
