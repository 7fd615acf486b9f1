pub mod anime_service;
pub use anime_service::{AnimeError, AnimeService, ProgressView};

pub mod anime_service_impl;
pub use anime_service_impl::SeaOrmAnimeService;

pub mod user_service;
pub use user_service::{UserError, UserService, UserWithStats};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
