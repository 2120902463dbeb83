use anyhow::Context;
use chrono::{DateTime, TimeZone};
use std::{fs, path::Path};

/// `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`
pub fn timestamped_name<Tz: TimeZone>(prefix: &str, ext: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), ext)
}

pub fn write_file<P: AsRef<Path>>(p: P, bytes: &[u8]) -> anyhow::Result<()> {
    fs::write(&p, bytes).with_context(|| format!("write file {:?}", p.as_ref()))
}
