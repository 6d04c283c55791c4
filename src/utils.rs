/// Formats a body as `<N bytes>` instead of dumping it.
pub fn body_len_fmt<T: AsRef<[u8]>>(body: &T, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "<{} bytes>", body.as_ref().len())
}
