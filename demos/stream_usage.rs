//! Stream-based API usage examples
//!
//! Demonstrates enhancing images from memory, readers, and cursors
//! without touching the filesystem for input.

use std::io::Cursor;

use pixlift::{
    analyze_from_bytes, enhance_from_bytes, enhance_from_reader, EnhancementConfig,
    EnhancementMode, OutputFormat, Result,
};
use tokio::fs::File;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (optional)
    env_logger::init();

    println!("🌊 Stream-Based Enhancement Examples");
    println!("====================================");

    let config = EnhancementConfig::default();

    // Example 1: Analyze bytes without enhancing
    println!("\n🔍 Example 1: Quality report from bytes");
    let sample = create_sample_image()?;
    let report = analyze_from_bytes(&sample, &config)?;
    println!(
        "  • Score {:.0} ({}), needs enhancement: {}",
        report.score.overall, report.score.tier, report.needs_enhancement
    );

    // Example 2: Enhance bytes with the default configuration
    println!("\n📝 Example 2: Bytes in, optimized bytes out");
    let result = enhance_from_bytes(&sample, &config, EnhancementMode::Auto).await?;
    if let Some(bytes) = result.output_bytes() {
        tokio::fs::write("stream_example_1.jpg", bytes).await?;
        println!("✅ Wrote stream_example_1.jpg ({} bytes)", bytes.len());
    }

    // Example 3: Custom output format
    println!("\n🎛️ Example 3: PNG output with a fixed canvas");
    let png_config = EnhancementConfig::builder()
        .output_format(OutputFormat::Png)
        .standardize(true)
        .build()?;
    let result = enhance_from_bytes(&sample, &png_config, EnhancementMode::Standardize).await?;
    println!(
        "  • Canvas: {}x{}",
        result.enhanced_dimensions.0, result.enhanced_dimensions.1
    );
    if let Some(bytes) = result.output_bytes() {
        tokio::fs::write("stream_example_2.png", bytes).await?;
        println!("✅ Wrote stream_example_2.png");
    }

    // Example 4: Stream processing from a file reader
    println!("\n📁 Example 4: Enhancement from a file stream");
    if std::path::Path::new("input.jpg").exists() {
        let file = File::open("input.jpg").await?;
        let result = enhance_from_reader(file, &config, EnhancementMode::Full).await?;
        if let Some(bytes) = result.output_bytes() {
            tokio::fs::write("stream_example_3.jpg", bytes).await?;
            println!("✅ Wrote stream_example_3.jpg");
        }
    } else {
        println!("⚠️ Skipped: input.jpg not found");
    }

    // Example 5: Memory cursor processing
    println!("\n💾 Example 5: Enhancement from a memory cursor");
    let cursor = Cursor::new(create_sample_image()?);
    let result = enhance_from_reader(cursor, &config, EnhancementMode::Optimize).await?;
    println!(
        "  • {} -> {} bytes",
        result.original_size_bytes,
        result.enhanced_size_bytes()
    );

    println!("\n🎉 Stream processing examples completed!");
    Ok(())
}

/// Create a minimal sample image for testing
/// In real usage, you'd load actual image data from files, network, etc.
fn create_sample_image() -> Result<Vec<u8>> {
    use image::{ImageBuffer, Rgb};

    let img = ImageBuffer::from_fn(64, 64, |x, y| {
        let r = (x * 4) as u8;
        let g = (y * 4) as u8;
        let b = ((x + y) * 2) as u8;
        Rgb([r, g, b])
    });

    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, image::ImageFormat::Png)?;

    Ok(buffer)
}
