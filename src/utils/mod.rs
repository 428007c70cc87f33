pub mod colors;
pub mod nonce;
pub mod paging;
pub mod sanitize;
pub mod token;
