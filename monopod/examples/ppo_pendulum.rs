use anyhow::Result;
use clap::{Parser, ValueEnum};
use monopod::pendulum::{Pendulum, PendulumConfig, ACT_DIM, OBS_DIM};
use monopod_candle_agent::{
    actor_critic::ActorCriticConfig,
    distribution::DistributionKind,
    opt::OptimizerConfig,
    ppo::{Ppo, PpoConfig},
    Device,
};
use monopod_core::{
    record::AggregateRecorder, Agent, Evaluator as _, Trainer, TrainerConfig,
    TrajectoryBufferConfig,
};
use monopod_tensorboard::TensorboardRecorder;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Distribution {
    Gaussian,
    Squashed,
    Beta,
    BetaMeanConcentration,
    BetaMeanStd,
}

impl From<Distribution> for DistributionKind {
    fn from(d: Distribution) -> Self {
        match d {
            Distribution::Gaussian => DistributionKind::default(),
            Distribution::Squashed => DistributionKind::squashed_diag_gaussian(),
            Distribution::Beta => DistributionKind::Beta,
            Distribution::BetaMeanConcentration => DistributionKind::BetaMeanConcentration,
            Distribution::BetaMeanStd => DistributionKind::beta_mean_std(),
        }
    }
}

/// Train/eval PPO agent in pendulum environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (YAML) overriding all the other training options
    #[arg(long)]
    config: Option<String>,

    /// Evaluate the parameters in the given checkpoint, not train
    #[arg(long)]
    eval: Option<String>,

    /// Action distribution of the policy
    #[arg(long, value_enum, default_value_t = Distribution::Gaussian)]
    distribution: Distribution,

    /// Size of the hidden layers
    #[arg(long, default_value_t = 64)]
    hid: usize,

    /// Number of the hidden layers
    #[arg(short, long, default_value_t = 2)]
    l: usize,

    #[arg(long, default_value_t = 0.99)]
    gamma: f32,

    #[arg(long, default_value_t = 0.97)]
    lam: f32,

    #[arg(long, default_value_t = 0.2)]
    clip_ratio: f64,

    #[arg(long, default_value_t = 0.01)]
    target_kl: f64,

    #[arg(long, default_value_t = 3e-4)]
    pi_lr: f64,

    #[arg(long, default_value_t = 1e-3)]
    vf_lr: f64,

    #[arg(long, default_value_t = 80)]
    train_pi_iters: usize,

    #[arg(long, default_value_t = 80)]
    train_v_iters: usize,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 4000)]
    steps_per_epoch: usize,

    #[arg(long, default_value_t = 200)]
    max_ep_len: usize,

    #[arg(long, default_value_t = 50)]
    epochs: usize,

    #[arg(long, default_value_t = 5)]
    eval_episodes: usize,

    /// Interval of checkpoints in epochs, 0 disables them
    #[arg(long, default_value_t = 10)]
    save_freq: usize,

    /// Directory of checkpoints and TensorBoard logs
    #[arg(long, default_value = "./monopod/examples/model/ppo_pendulum")]
    save_dir: String,

    /// Use the first CUDA device
    #[arg(long, default_value_t = false)]
    cuda: bool,
}

/// All the configurations of a training run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct ExperimentConfig {
    env: PendulumConfig,
    trainer: TrainerConfig,
    buffer: TrajectoryBufferConfig,
    ppo: PpoConfig,
}

impl ExperimentConfig {
    fn from_args(args: &Args) -> Self {
        let device = match args.cuda {
            true => Device::Cuda(0),
            false => Device::Cpu,
        };
        let actor_critic_config = ActorCriticConfig::default()
            .obs_dim(OBS_DIM)
            .act_dim(ACT_DIM)
            .hidden_sizes(vec![args.hid; args.l])
            .distribution(args.distribution.into())
            .pi_opt_config(OptimizerConfig::default().learning_rate(args.pi_lr))
            .vf_opt_config(OptimizerConfig::default().learning_rate(args.vf_lr))
            .seed(args.seed)
            .device(device);
        let ppo = PpoConfig::default()
            .clip_ratio(args.clip_ratio)
            .target_kl(args.target_kl)
            .train_pi_iters(args.train_pi_iters)
            .train_v_iters(args.train_v_iters)
            .actor_critic_config(actor_critic_config);
        let trainer = TrainerConfig::default()
            .epochs(args.epochs)
            .steps_per_epoch(args.steps_per_epoch)
            .max_episode_len(args.max_ep_len)
            .eval_episodes(args.eval_episodes)
            .save_freq(args.save_freq)
            .seed(args.seed as _)
            .model_dir(args.save_dir.as_str());
        let buffer = TrajectoryBufferConfig::default()
            .capacity(args.steps_per_epoch)
            .obs_dim(OBS_DIM)
            .act_dim(ACT_DIM)
            .gamma(args.gamma)
            .lambda(args.lam);

        Self {
            env: PendulumConfig::default().max_steps(args.max_ep_len),
            trainer,
            buffer,
            ppo,
        }
    }

    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(serde_yaml::from_reader(rdr)?)
    }

    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

fn build_trainer(config: &ExperimentConfig) -> Result<Trainer<Pendulum>> {
    Trainer::build(config.trainer.clone(), config.env.clone(), config.buffer.clone())
}

fn train(config: &ExperimentConfig) -> Result<()> {
    let save_dir = config.trainer.model_dir.clone().unwrap_or_else(|| ".".into());
    std::fs::create_dir_all(&save_dir)?;
    config.save(Path::new(&save_dir).join("config.yaml"))?;

    let mut trainer = build_trainer(config)?;
    let mut agent = Ppo::<Pendulum>::build(config.ppo.clone())?;
    let mut recorder: Box<dyn AggregateRecorder> = Box::new(TensorboardRecorder::new(&save_dir));
    let mut evaluator = trainer.default_evaluator()?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;
    agent.save_params(&Path::new(&save_dir).join("final.safetensors"))?;

    Ok(())
}

fn eval(config: &ExperimentConfig, checkpoint: &str) -> Result<f32> {
    let mut agent = {
        let mut agent = Ppo::<Pendulum>::build(config.ppo.clone())?;
        agent.load_params(Path::new(checkpoint))?;
        agent.eval();
        agent
    };
    let record = build_trainer(config)?
        .default_evaluator()?
        .evaluate(&mut agent)?;
    let eval_return = record.get_scalar("eval_return")?;
    log::info!("eval_return = {}", eval_return);

    Ok(eval_return)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match args.config.as_ref() {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::from_args(&args),
    };

    match args.eval.as_ref() {
        Some(checkpoint) => {
            eval(&config, checkpoint)?;
        }
        None => train(&config)?,
    }

    Ok(())
}
