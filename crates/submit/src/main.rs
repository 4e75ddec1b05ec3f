use clap::{crate_description, crate_version, Parser};
use crd::constants;
use crd::spark_application::SparkApplication;
use kube::{Api, Client};
use submit::driver::DefaultDriverPodBuilder;
use submit::pipeline::{IdGenerator, RandomIdGenerator, SubmissionPipeline};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
    pub const TARGET_PLATFORM: Option<&str> = option_env!("TARGET");
}

#[derive(clap::Parser, Debug, PartialEq, Eq)]
#[command(long_about = "")]
pub enum Command {
    /// Print CRD objects
    Crd(CrdParams),
    /// Print the submission properties an application would be launched with
    Props(PropsParams),
    /// Submit an application to the cluster
    Submit(SubmitParams),
}

#[derive(clap::Parser, Debug, PartialEq, Eq)]
#[command(long_about = "")]
pub struct CrdParams {
    /// Provides the path to write the CRD objects to
    #[arg(long, short = 'f', value_name = "FILE", default_value = "", env)]
    pub file: String,
}

#[derive(clap::Parser, Debug, PartialEq, Eq)]
#[command(long_about = "")]
pub struct PropsParams {
    /// Provides the path to an application yaml
    #[arg(long, short = 'f')]
    pub file: String,
}

#[derive(clap::Parser, Debug, PartialEq, Eq)]
#[command(long_about = "")]
pub struct SubmitParams {
    /// Provides the path to an application yaml
    #[arg(long, short = 'f')]
    pub file: String,
    /// Tracing log collector system
    #[arg(long, env, default_value_t, value_enum)]
    pub tracing_target: common::logging::TracingTarget,
    /// Log level
    #[arg(long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser)]
#[clap(about, author)]
struct Opts {
    #[clap(subcommand)]
    cmd: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    match opts.cmd {
        Command::Crd(crd) => {
            if crd.file.is_empty() {
                crd::print_yaml_schema::<SparkApplication>()?;
            } else {
                crd::serialize_crds_to_file(crd.file.as_str())?;
            }
            Ok(())
        }

        Command::Props(props) => {
            let mut app = crd::application_from_yaml_file(props.file.as_str())?;
            print_submission_properties(&mut app)?;
            Ok(())
        }

        Command::Submit(SubmitParams {
            file,
            tracing_target,
            log_level,
        }) => {
            common::logging::initialize_logging(
                constants::SUBMIT_LOG_ENV,
                constants::APP_NAME,
                tracing_target,
                log_level.as_str(),
            );
            common::utils::print_startup_string(
                crate_description!(),
                crate_version!(),
                built_info::GIT_VERSION,
                built_info::TARGET_PLATFORM.unwrap_or("unknown target platform"),
                built_info::BUILT_TIME_UTC,
                built_info::RUSTC_VERSION,
            );

            let mut app = crd::application_from_yaml_file(file.as_str())?;
            let namespace = submit::naming::app_namespace(&app);

            let kube_client = Client::try_default().await?;
            let config_maps: Api<k8s_openapi::api::core::v1::ConfigMap> =
                Api::namespaced(kube_client.clone(), &namespace);
            let pods: Api<k8s_openapi::api::core::v1::Pod> =
                Api::namespaced(kube_client.clone(), &namespace);
            let services: Api<k8s_openapi::api::core::v1::Service> =
                Api::namespaced(kube_client.clone(), &namespace);

            let ids = RandomIdGenerator;
            let submission_id = ids.generate_submission_id();
            let pipeline = SubmissionPipeline::new(
                config_maps,
                pods,
                services,
                DefaultDriverPodBuilder,
                ids,
            );
            pipeline.submit(&mut app, &submission_id).await?;
            Ok(())
        }
    }
}

/// Offline dry run of the translation step. Prints the flattened properties
/// without touching the cluster.
fn print_submission_properties(app: &mut SparkApplication) -> anyhow::Result<()> {
    let ids = RandomIdGenerator;
    let submission_id = ids.generate_submission_id();
    let application_id = ids.generate_application_id();

    let driver_pod_name = submit::naming::driver_pod_name(app);
    let service_name = submit::naming::service_name(&driver_pod_name);
    let local_dir_options =
        submit::volumes::extract_local_dir_options(&mut app.spec, &submit::schema::SCHEMA);

    let properties = submit::properties::build_submission_properties(
        app,
        &driver_pod_name,
        &submission_id,
        &application_id,
        &service_name,
        "k8s://https://localhost:443",
        &local_dir_options,
        &submit::schema::SCHEMA,
    )?;
    println!("{properties}");
    Ok(())
}
