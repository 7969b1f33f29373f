pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtService, TokenType};
pub use password::PasswordService;
