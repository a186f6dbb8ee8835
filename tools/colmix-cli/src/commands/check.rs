//! Check the media stack.

use colmix_media_source::gst_reader::{gstreamer_version, missing_elements};

pub fn run() -> anyhow::Result<()> {
    println!("Colmix System Check");
    println!("{}", "=".repeat(50));

    let version = match gstreamer_version() {
        Ok(version) => version,
        Err(e) => {
            println!("[FAIL] GStreamer: {e}");
            println!();
            println!("Video sources are unavailable; still images will still mix.");
            return Ok(());
        }
    };
    println!("[OK] GStreamer: {version}");

    let missing = missing_elements()?;
    for element in colmix_media_source::gst_reader::REQUIRED_ELEMENTS {
        if missing.contains(&element) {
            println!("[FAIL] Element: {element}");
        } else {
            println!("[OK] Element: {element}");
        }
    }

    println!();
    if missing.is_empty() {
        println!("All required elements are available. Colmix is ready.");
    } else {
        println!(
            "Missing elements: {}. Install the GStreamer base/good plugin sets.",
            missing.join(", ")
        );
    }

    Ok(())
}
