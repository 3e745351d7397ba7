pub mod drape;
pub mod graticule;
