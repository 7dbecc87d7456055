use anyhow::{anyhow, Result};

use salvager::callback;

use crate::cli::PagerOpts;

/// Subscribe a printing sink and run the pager/overlay diagnostics.
pub fn exec(opts: PagerOpts, json: bool) -> Result<()> {
    let (notifier, mut pager) = opts.build();

    let _sub = notifier.subscribe(callback(move |error| {
        if json {
            match serde_json::to_string(error) {
                Ok(line) => println!("{}", line),
                Err(_) => println!("{}", error),
            }
        } else {
            println!("{}", error);
        }
    }));

    pager
        .initialize()
        .map_err(|e| anyhow!("initialize {}: {}", opts.path.display(), e))?;
    pager.hint();
    Ok(())
}
