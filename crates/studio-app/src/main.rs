//! Studio command-line front end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use studio_app::{init_tracing, Studio, StudioConfig, TracingNotifier};
use studio_client::{ClientConfig, StudioClient};
use studio_core::{PipelineOptions, PipelineOutcome, Tab};
use studio_models::{ClipId, JobId, LibraryFilter, RenderJobId, VoiceProvider};

#[derive(Parser)]
#[command(
    name = "studio",
    version,
    about = "Turn long videos into short clips and composed renders"
)]
struct Cli {
    /// Backend base URL (overrides STUDIO_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video, run the clip pipeline and list the results
    Process {
        /// Source video file
        #[arg()]
        file: PathBuf,

        /// Clip types to extract (repeatable)
        #[arg(long = "clip-type", required = true)]
        clip_types: Vec<String>,

        /// Number of clips to produce
        #[arg(long, default_value_t = 5)]
        count: u32,

        /// Target audience
        #[arg(long, default_value = "")]
        audience: String,

        /// Add generated narration to each clip
        #[arg(long)]
        narration: bool,

        /// Insert ads into the rendered clips
        #[arg(long)]
        ads: bool,

        /// Ad image or video to insert; uploaded first when it is a local file
        #[arg(long)]
        ad_asset: Option<PathBuf>,

        /// Where ads go: start, end, between or both
        #[arg(long, default_value = "end")]
        ad_placement: String,

        /// Insert an ad every this many clips (between and both only)
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        ad_frequency: u32,

        /// Seconds an image ad stays on screen
        #[arg(long, default_value_t = 3)]
        ad_image_duration: u32,
    },

    /// List the curated clip library
    Library {
        /// Minimum meme score
        #[arg(long, default_value_t = 0)]
        min_score: u32,

        /// Only clips from this source
        #[arg(long)]
        source: Option<String>,
    },

    /// Save clips of a finished job to the library
    Save {
        job_id: String,

        #[arg(required = true)]
        clip_ids: Vec<String>,
    },

    /// Generate narration audio for a script
    Narrate {
        #[arg(long)]
        script: String,

        #[arg(long, default_value = "openai")]
        provider: String,

        #[arg(long)]
        voice: Option<String>,
    },

    /// Compose hook, narrated body and CTA into one video
    Render {
        /// Library clip used as the hook
        #[arg(long)]
        clip: String,

        /// Body script
        #[arg(long)]
        script: String,

        /// Hook caption; defaults to the clip caption
        #[arg(long)]
        caption: Option<String>,

        #[arg(long, default_value = "openai")]
        provider: String,

        #[arg(long)]
        voice: Option<String>,

        /// Generate narration audio before submitting
        #[arg(long)]
        narrate: bool,

        /// Call-to-action tagline
        #[arg(long)]
        cta: Option<String>,

        #[arg(long)]
        output_name: Option<String>,
    },

    /// Show the render queue
    Queue {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Remove a finished or failed render job
    Remove { render_id: String },

    /// List published videos
    Published,

    /// Delete a published video
    Unpublish { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = StudioConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url.as_deref() {
        config.client.base_url = ClientConfig::with_base_url(url)?.base_url;
    }
    info!(base_url = %config.client.base_url, "Starting studio");

    let client = StudioClient::new(config.client.clone()).context("Failed to create client")?;
    let studio = Arc::new(Studio::new(Arc::new(client), Arc::new(TracingNotifier)));

    match cli.command {
        Commands::Process {
            file,
            clip_types,
            count,
            audience,
            narration,
            ads,
            ad_asset,
            ad_placement,
            ad_frequency,
            ad_image_duration,
        } => {
            let ad_config = if ads {
                studio.refresh_ad_assets().await?;
                if let Some(asset) = ad_asset {
                    if asset.is_file() {
                        studio.upload_ad_asset(&asset).await?;
                    } else {
                        studio.select_ad_asset(Some(asset.to_string_lossy().into_owned()));
                    }
                }
                Some(studio.read(|s| s.ad_config(&ad_placement, ad_frequency, ad_image_duration)))
            } else {
                None
            };

            let job_id = studio.upload(&file).await?;
            println!("Uploaded {} as job {}", file.display(), job_id);

            let options = PipelineOptions {
                clip_types,
                add_narration: narration,
                count,
                audience,
                ad_config,
            };
            studio.start_pipeline(&options).await?;

            let outcome = studio
                .watch_pipeline(|pipeline| {
                    println!(
                        "[{:>3}%] {}",
                        pipeline.progress_percent(),
                        pipeline.status_message()
                    );
                })
                .await?;

            match outcome {
                PipelineOutcome::Completed => print_library(&studio),
                PipelineOutcome::Failed { message } => bail!("Pipeline failed: {message}"),
                PipelineOutcome::InProgress => bail!("Event stream closed before the job finished"),
            }
        }

        Commands::Library { min_score, source } => {
            studio.load_library(LibraryFilter::new(min_score, source)).await?;
            print_library(&studio);
        }

        Commands::Save { job_id, clip_ids } => {
            studio.load_job_library(&JobId::from(job_id.as_str())).await?;
            for id in &clip_ids {
                studio.toggle_clip(&ClipId::from(id.as_str()))?;
            }
            let response = studio.save_selected().await?;
            if !response.ok {
                bail!("Backend did not save the clips");
            }
            println!("Saved {} clip(s) to {}", response.saved, response.dest);
        }

        Commands::Narrate {
            script,
            provider,
            voice,
        } => {
            let provider = parse_provider(&provider)?;
            studio.edit_composer(|composer| {
                composer.set_provider(provider);
                composer.set_script(script);
                voice.map_or(Ok(()), |v| composer.set_voice(&v))
            })?;
            let narration = studio.generate_narration().await?;
            println!("{} ({:.1}s)", narration.audio_url, narration.duration);
        }

        Commands::Render {
            clip,
            script,
            caption,
            provider,
            voice,
            narrate,
            cta,
            output_name,
        } => {
            let provider = parse_provider(&provider)?;
            studio.load_library(LibraryFilter::default()).await?;
            studio.select_clip(&ClipId::from(clip.as_str()))?;
            studio.edit_composer(|composer| {
                composer.set_provider(provider);
                composer.set_script(script);
                if let Some(caption) = caption {
                    composer.set_caption(caption);
                }
                if let Some(cta) = cta {
                    composer.set_cta_tagline(cta);
                }
                if let Some(name) = output_name {
                    composer.set_output_name(name);
                }
                voice.map_or(Ok(()), |v| composer.set_voice(&v))
            })?;

            if narrate {
                let narration = studio.generate_narration().await?;
                println!("Narration ready ({:.1}s)", narration.duration);
            }

            let id = studio.submit_render().await?;
            println!("Render job {id} queued");
            print_queue(&studio);
        }

        Commands::Queue { watch } => {
            if watch {
                let cancel = CancellationToken::new();
                let tasks = studio.spawn_pollers(&config, cancel.clone());
                tokio::signal::ctrl_c().await.ok();
                info!("Received shutdown signal");
                cancel.cancel();
                for task in tasks {
                    task.await.ok();
                }
            } else {
                studio.poll_queue().await?;
            }
            print_queue(&studio);
        }

        Commands::Remove { render_id } => {
            studio.poll_queue().await?;
            studio
                .remove_render_job(&RenderJobId::from(render_id.as_str()))
                .await?;
            println!("Removed {render_id}");
        }

        Commands::Published => {
            studio.switch_tab(Tab::Published).await;
            print_published(&studio);
        }

        Commands::Unpublish { path } => {
            studio.delete_published(&path).await?;
            print_published(&studio);
        }
    }

    Ok(())
}

fn parse_provider(name: &str) -> Result<VoiceProvider> {
    VoiceProvider::parse(name).with_context(|| format!("Unknown voice provider: {name}"))
}

fn print_library(studio: &Studio<StudioClient>) {
    studio.read(|s| {
        let clips = s.library().clips();
        if clips.is_empty() {
            println!("No clips");
        }
        for clip in clips {
            println!(
                "{}  {:>5.1}s  score {:>3.0}  {}",
                clip.id,
                clip.duration_seconds,
                clip.meme_score,
                clip.display_caption()
            );
        }
    });
}

fn print_queue(studio: &Studio<StudioClient>) {
    studio.read(|s| {
        if s.queue().is_empty() {
            println!("Queue is empty");
        }
        for job in s.queue().jobs() {
            match job.failure() {
                Some(error) => println!("{}  {}  {}  {}", job.id, job.status, job.output_name, error),
                None => println!("{}  {}  {}", job.id, job.status, job.output_name),
            }
        }
    });
}

fn print_published(studio: &Studio<StudioClient>) {
    studio.read(|s| match s.published().snapshot() {
        Some(snapshot) => {
            println!("Published {}", snapshot.quota_label());
            for video in &snapshot.videos {
                println!("{:>7.1} MB  {}", video.size_mb, video.display_name());
            }
        }
        None => println!("Published list not loaded"),
    });
}
