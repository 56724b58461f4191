pub mod medicine;

pub use medicine::Medicine;
