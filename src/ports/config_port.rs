//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value of `key` in `section`, if present.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Keys of `section` in the order they appear in the source. Empty when
    /// the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;
}
