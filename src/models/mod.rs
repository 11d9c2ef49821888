mod article;
mod source;

pub use article::{Article, ArticleKey, NewArticle};
pub use source::Source;
