use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::PagerOpts;

pub fn exec(opts: PagerOpts, number: u32, out: Option<PathBuf>) -> Result<()> {
    if number == 0 {
        return Err(anyhow!("page numbers are 1-based"));
    }
    let (_notifier, mut pager) = opts.build();
    pager
        .initialize()
        .map_err(|e| anyhow!("initialize {}: {}", opts.path.display(), e))?;

    let data = match pager.acquire_page_data(number) {
        Some(d) => d,
        None => {
            let detail = pager
                .last_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown failure".to_string());
            return Err(anyhow!("acquire page {}: {}", number, detail));
        }
    };

    match out {
        Some(path) => {
            fs::write(&path, data.as_slice())
                .with_context(|| format!("write page to {}", path.display()))?;
            println!("wrote {} bytes to {}", data.len(), path.display());
        }
        None => hex_dump(data.as_slice()),
    }
    Ok(())
}

fn hex_dump(data: &[u8]) {
    for (i, row) in data.chunks(16).enumerate() {
        print!("{:08x} ", i * 16);
        for b in row {
            print!(" {:02x}", b);
        }
        println!();
    }
}
