pub mod banner;
pub mod class;
pub mod faq;
pub mod gallery_image;
pub mod review;
pub mod user;

pub use banner::{Banner, BannerView};
pub use class::{Class, ClassView};
pub use faq::{Faq, FaqView};
pub use gallery_image::{GalleryImage, GalleryImageView};
pub use review::{Review, ReviewView};
pub use user::User;
