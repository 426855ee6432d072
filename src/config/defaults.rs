use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("lifeplan"))
}

pub fn default_recent_limit() -> usize {
    5
}

pub fn default_table() -> String {
    "plans".to_string()
}

pub fn default_waitlist_table() -> String {
    "pro_waitlist".to_string()
}

pub fn default_remote_timeout_sec() -> u64 {
    15
}

pub fn default_page_width() -> usize {
    80
}

pub fn default_page_height() -> usize {
    60
}

pub fn default_margin() -> usize {
    2
}
