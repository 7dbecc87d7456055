use anyhow::Result;
use serde_json::json;

use crate::cli::PagerOpts;

/// Initialize a pager and print its view of the target. A failed
/// initialization is still a useful answer here: the classified error is
/// part of the report, so this command does not bail on it.
pub fn exec(opts: PagerOpts, json: bool) -> Result<()> {
    let (_notifier, mut pager) = opts.build();
    let init = pager.initialize();
    let ok = init.is_ok();

    let last_error = pager.last_error().cloned();

    if json {
        let mut obj = json!({
            "path": pager.path().display().to_string(),
            "initialized": ok,
        });
        if ok {
            obj["geometry"] = json!({
                "page_size": pager.page_size(),
                "reserved_bytes": pager.reserved_bytes(),
                "usable_size": pager.usable_size(),
            });
            obj["file_size"] = json!(pager.file_size());
            obj["number_of_pages"] = json!(pager.number_of_pages());
            obj["wal"] = json!({
                "frame_count": pager.wal_frame_count(),
                "salt1": pager.wal_salt().0,
                "salt2": pager.wal_salt().1,
                "disposed_pages": pager.disposed_wal_page_count(),
            });
        }
        if let Some(e) = &last_error {
            obj["last_error"] = serde_json::to_value(e)?;
        }
        println!("{}", serde_json::to_string_pretty(&obj)?);
        return Ok(());
    }

    println!("path:            {}", pager.path().display());
    println!("initialized:     {}", ok);
    if ok {
        println!("page_size:       {}", pager.page_size());
        println!("reserved_bytes:  {}", pager.reserved_bytes());
        println!("usable_size:     {}", pager.usable_size());
        println!("file_size:       {}", pager.file_size());
        println!("number_of_pages: {}", pager.number_of_pages());
        let (s1, s2) = pager.wal_salt();
        println!("wal_frames:      {}", pager.wal_frame_count());
        println!("wal_salt:        {:#010x} {:#010x}", s1, s2);
        println!("wal_disposed:    {}", pager.disposed_wal_page_count());
    }
    if let Some(e) = &last_error {
        println!("last_error:      {}", e);
    }
    Ok(())
}
