use std::env;

use greenwall::{rasterize, Font, Spacing};

fn main() {
    let args = env::args().collect::<Vec<_>>();
    if args.len() > 3 {
        eprintln!("usage: {} [text] [font.bdf|font.psf]", args[0]);
        return;
    }
    let text = match args.get(1) {
        Some(x) => x.as_str(),
        None => "demo",
    };
    let font = match args.get(2) {
        Some(path) => Font::load(path),
        None => Font::builtin(),
    };
    let font = match font {
        Ok(font) => font,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    match rasterize(&font, text, Spacing::Advance) {
        Ok(raster) => {
            println!("{}", raster.preview());
            println!("{} cells over {} weeks", raster.len(), raster.weeks());
        }
        Err(e) => eprintln!("{e}"),
    }
}
