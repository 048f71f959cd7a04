// CLI demo for the verification pipeline: verify a license or identity
// card image from disk and store it in a local upload directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use verifika::models::{ImageFile, LicenseVerificationResult};
use verifika::upload::{FileSystemStore, UploadCoordinator};

#[derive(Parser)]
#[command(
    name = "verifika",
    about = "OCR-based verification of Malta firearms licenses and identity cards"
)]
struct Cli {
    /// Directory the uploaded image is stored in
    #[arg(long, default_value = "uploads")]
    out_dir: PathBuf,

    /// Print the verification result as JSON instead of a report
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify and upload a firearms license image
    License {
        image: PathBuf,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Verify and upload an identity card image
    IdCard {
        image: PathBuf,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}

fn load_image(path: &Path) -> std::io::Result<ImageFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.jpg")
        .to_string();
    Ok(ImageFile::new(name, content_type_for(path), bytes))
}

fn print_license_report(result: &LicenseVerificationResult) {
    println!("\n==============================================");
    println!("        LICENSE VERIFICATION REPORT");
    println!("==============================================\n");

    println!("  Verified:       {}", if result.is_verified { "YES" } else { "NO" });
    println!(
        "  Header check:   {}",
        if verifika::LicenseVerifier::contains_header(&result.text) {
            "PASSED"
        } else {
            "FAILED"
        }
    );
    println!(
        "  Expiry:         {}",
        match (&result.expiry_date, result.is_expired) {
            (Some(date), true) => format!("EXPIRED ({})", date),
            (Some(date), false) => format!("valid until {}", date),
            (None, _) => "no date found".to_string(),
        }
    );
    println!(
        "  Name match:     {}",
        if result.name_match { "PASSED" } else { "FAILED" }
    );
    if let Some(name) = &result.extracted_name {
        println!("  Extracted name: {}", name);
    }
    if let Some(details) = &result.name_match_details {
        println!(
            "  Name similarity: {}% against {}",
            details.similarity_score, details.profile_name
        );
    }
    println!("  Orientation:    {:?} ({} degrees)", result.orientation, result.rotation_angle);

    let t = &result.license_types;
    println!("\nLICENSE CATEGORIES:");
    println!("  TSL-A:                {}", t.tsl_a);
    println!("  TSL-A Special:        {}", t.tsl_a_special);
    println!("  TSL-B:                {}", t.tsl_b);
    println!("  Hunting:              {}", t.hunting);
    println!("  Collectors-A:         {}", t.collectors_a);
    println!("  Collectors-A Special: {}", t.collectors_a_special);
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = UploadCoordinator::new(FileSystemStore::new(&cli.out_dir));
    let progress = |pct: u8| eprintln!("  ... {}%", pct);

    match cli.command {
        Command::License {
            image,
            first_name,
            last_name,
        } => {
            let file = load_image(&image)?;
            let upload = coordinator.upload_license(
                file,
                first_name.as_deref(),
                last_name.as_deref(),
                progress,
            )?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&upload.result)?);
            } else {
                print_license_report(&upload.result);
                println!("\nStored at: {}", upload.image_url);
                println!("{}", upload.message);
            }
        }
        Command::IdCard {
            image,
            first_name,
            last_name,
        } => {
            let file = load_image(&image)?;
            let upload = coordinator.upload_id_card(file, &first_name, &last_name, progress)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&upload.result)?);
            } else {
                println!("\nIdentity card verified: {}", upload.result.is_verified);
                if let Some(name) = &upload.result.extracted_name {
                    println!("Extracted name: {}", name);
                }
                println!("Stored at: {}", upload.image_url);
                println!("{}", upload.message);
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
