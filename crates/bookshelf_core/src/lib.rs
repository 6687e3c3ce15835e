pub mod domain;
pub mod pagination;
pub mod ports;

pub use domain::{
    Author, AuthorChanges, Book, BookChanges, Identity, NewAuthor, NewBook, NewUser, User,
    UserChanges, UserCredentials,
};
pub use pagination::{Page, PageRequest};
pub use ports::{
    AuthorRepository, BookRepository, CacheService, PortError, PortResult, UserRepository,
};
