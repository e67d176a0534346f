#[macro_export]
macro_rules! try_match {
    ($e:expr, $(|)? $pattern:pat $( if $guard:expr )? $(,)? => $v:expr) => {
        match $e {
            $pattern $( if $guard )? => Some($v),
            _ => None,
        }
    }
}

/// Pads `name` with spaces on the right up to `width` characters.
pub fn pad_right(name: &str, width: usize) -> String {
    format!("{:<width$}", name, width = width)
}
