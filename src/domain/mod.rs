pub mod cublet;
pub mod face;
pub mod inspect;
pub mod lattice;
pub mod turn;
