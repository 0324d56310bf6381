//! Complete example demonstrating library usage with quality analysis,
//! adaptive enhancement, and cost tracking
//!
//! Run with an `input.jpg` in the working directory. Set
//! `PIXLIFT_REMOTE_ENDPOINT` (and optionally `PIXLIFT_API_KEY`) to route
//! heavy operations through a remote provider.

use std::path::Path;
#[cfg(feature = "remote-http")]
use std::sync::Arc;

#[cfg(feature = "remote-http")]
use pixlift::HttpRemoteEnhancer;
use pixlift::{
    services::ImageIOService, EnhancementConfig, EnhancementMode, EnhancementPipeline, Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (optional)
    env_logger::init();

    println!("🚀 Pixlift Product Photo Enhancement Example");
    println!("============================================");

    // 1. Configure the pipeline
    println!("\n🎛️ Configuring enhancement...");
    let config = EnhancementConfig::builder()
        .jpeg_quality(92)
        .target_max_size_kb(Some(500))
        .daily_budget(5.0)
        .build()?;

    let builder = EnhancementPipeline::builder().config(config);

    // 2. Attach a remote provider when one is configured
    #[cfg(feature = "remote-http")]
    let builder = match std::env::var("PIXLIFT_REMOTE_ENDPOINT") {
        Ok(endpoint) => {
            let provider =
                HttpRemoteEnhancer::new(endpoint, std::env::var("PIXLIFT_API_KEY").ok(), 30)?;
            println!("🌐 Remote provider attached, heavy operations may route remotely");
            builder.remote(Arc::new(provider))
        },
        Err(_) => {
            println!("💻 No remote endpoint set, everything runs locally");
            builder
        },
    };

    let pipeline = builder.build()?;

    // 3. Process an image (if input exists)
    let input_path = "input.jpg";
    if Path::new(input_path).exists() {
        let image = ImageIOService::load_image(input_path)?;

        // Measure quality before touching anything
        println!("\n🔍 Analyzing {input_path}...");
        let report = pipeline.analyze(&image)?;
        println!(
            "  • Overall score: {:.0} ({})",
            report.score.overall, report.score.tier
        );
        for issue in &report.issues {
            println!("  • {}: {}", issue.description, issue.recommendation);
        }

        // Enhance with the adaptive plan
        println!("\n🖼️ Enhancing...");
        let result = pipeline.enhance(&image, EnhancementMode::Auto).await?;

        println!("\n📊 Processing steps:");
        for step in &result.steps {
            let status = if step.success { "✅" } else { "❌" };
            println!(
                "  {} {} via {} ({}ms, ${:.4})",
                status, step.stage, step.method, step.latency_ms, step.cost_usd
            );
        }

        println!("\n🧭 Routing decisions:");
        for decision in &result.decisions {
            println!("  • {}: {}", decision.operation, decision.reason);
        }

        if let (Some(before), Some(after)) = (&result.quality_before, &result.quality_after) {
            println!(
                "\n📈 Quality: {:.0} -> {:.0}",
                before.overall, after.overall
            );
        }
        println!("  • Total time: {}ms", result.timings.total_ms);

        result.save("enhanced.jpg")?;
        println!("✅ Saved enhanced image to enhanced.jpg");
    } else {
        println!("⚠️ Input image '{input_path}' not found. Create this file to test processing.");
        println!("   Example: cp /path/to/your/image.jpg {input_path}");
    }

    // 4. Show budget consumption
    let usage = pipeline.usage();
    println!("\n💰 Remote spend today: ${:.4} of ${:.2}", usage.total_cost_usd, usage.budget_usd);

    println!("\n🎉 Library example completed successfully!");
    Ok(())
}
