extern crate clap;
use clap::*;

mod cmd_gcmap;

fn main() -> anyhow::Result<()> {
    let app = cmd_gcmap::contact::make_command()
        .version(crate_version!())
        .author(crate_authors!())
        .color(ColorChoice::Auto);

    cmd_gcmap::contact::execute(&app.get_matches())?;

    Ok(())
}
