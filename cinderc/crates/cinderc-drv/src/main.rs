use std::env;
use std::fs;

use anyhow::{bail, Context};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "cinderc".to_string());

    let (Some(path), None) = (args.next(), args.next()) else {
        bail!("usage: {} <source>", program);
    };

    let source = fs::read_to_string(&path).with_context(|| format!("{}: cannot read", path))?;

    match cinderc_drv::compile(&path, &source) {
        Ok(ir) => {
            print!("{}", ir);
            Ok(())
        }
        Err(err) => bail!("{}", err.diagnostic(&path)),
    }
}
