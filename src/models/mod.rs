pub mod car;
pub mod user;

pub use car::{decode_keep_list, decode_tags, Car, CarFields, CarQuery, NewCar};
pub use user::{NewUser, User};
