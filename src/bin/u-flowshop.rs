//! Batch runner for hybrid flow shop instances.
//!
//! ```text
//! u-flowshop ga  --instances ./Instances --permutations ./Permutations --output ./Results
//! u-flowshop pso --instances ./Instances --output ./Results --generations 300
//! u-flowshop generate --output ./Instances --jobs 20 --machines 2,3,2 --count 10
//! ```
//!
//! Instances are files named `I<k>.txt`, processed in numeric order of `k`.
//! Seed permutations are `P<k>.txt` with 0-based job indices.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use clap::{arg, value_parser, ArgMatches, Command};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use u_flowshop::decoder::decode;
use u_flowshop::ga::{Crossover, GaConfig, GaRunner, Mutation, Selection};
use u_flowshop::io::{
    read_instance, read_permutation, write_history_csv, write_instance, write_permutation,
    write_summary_csv, RunSummary,
};
use u_flowshop::model::{InstanceGenerator, MachineType, Problem, DEFAULT_DUE_DATE};
use u_flowshop::pso::{PsoConfig, PsoCrossover, PsoMutation, PsoRunner};

fn batch_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(--instances <DIR> "Directory holding I<k>.txt instance files")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(
        arg!(--permutations [DIR] "Directory holding P<k>.txt seed permutations")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(arg!(--output <DIR> "Directory for result CSVs").value_parser(value_parser!(PathBuf)))
    .arg(
        arg!(--duedate [DUE] "Due date given to every job")
            .default_value("100")
            .value_parser(value_parser!(u32)),
    )
    .arg(
        arg!(--config [FILE] "TOML file with algorithm parameters; flags override it")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(arg!(--optimum [VALUE] "Known optimum, for RPD").value_parser(value_parser!(f64)))
    .arg(arg!(--seed [SEED] "Random seed").value_parser(value_parser!(u64)))
}

fn cli() -> Command {
    Command::new("u-flowshop")
        .about("Total tardiness minimization in hybrid flow shops")
        .arg_required_else_help(true)
        .subcommand(batch_args(
            Command::new("ga")
                .about("Runs the genetic search over a batch of instances")
                .arg(arg!(--selection [TYPE] "tournament | roulette").value_parser(value_parser!(Selection)))
                .arg(
                    arg!(--crossover [TYPE] "obx | pmx | sb2ox | opx | tpx")
                        .value_parser(value_parser!(Crossover)),
                )
                .arg(
                    arg!(--mutation [TYPE] "insert | interchange | swap")
                        .value_parser(value_parser!(Mutation)),
                )
                .arg(arg!(--popsize [N] "Population size").value_parser(value_parser!(usize)))
                .arg(arg!(--pc [P] "Crossover probability").value_parser(value_parser!(f64)))
                .arg(arg!(--pm [P] "Mutation probability").value_parser(value_parser!(f64)))
                .arg(arg!(--restart [GENS] "Stagnant generations before restart, or 'inf'").value_parser(parse_interval))
                .arg(arg!(--lsfreq [GENS] "Local search frequency, or 'inf'").value_parser(parse_interval))
                .arg(arg!(--lsintensity [N] "Local search intensity").value_parser(value_parser!(usize)))
                .arg(arg!(--time [SECS] "Time budget per instance").value_parser(value_parser!(f64)))
                .arg(arg!(--generations [N] "Optional generation cap").value_parser(value_parser!(usize))),
        ))
        .subcommand(batch_args(
            Command::new("pso")
                .about("Runs the particle swarm over a batch of instances")
                .arg(arg!(--popsize [N] "Number of particles").value_parser(value_parser!(usize)))
                .arg(arg!(--generations [N] "Number of generations").value_parser(value_parser!(usize)))
                .arg(arg!(--c1 [P] "Personal-best crossover probability").value_parser(value_parser!(f64)))
                .arg(arg!(--c2 [P] "Global-best crossover probability").value_parser(value_parser!(f64)))
                .arg(arg!(--pm [P] "Mutation probability").value_parser(value_parser!(f64)))
                .arg(
                    arg!(--crossover [TYPE] "order | twopoint | pmx | ptl (or 1-4)")
                        .value_parser(value_parser!(PsoCrossover)),
                )
                .arg(
                    arg!(--mutation [TYPE] "swap | insert | multiswap | multiinsert (or 1-4)")
                        .value_parser(value_parser!(PsoMutation)),
                )
                .arg(arg!(--lsinterval [GENS] "Local search interval, or 'inf'").value_parser(parse_interval)),
        ))
        .subcommand(
            Command::new("generate")
                .about("Generates random instances and seed permutations")
                .arg(arg!(--output <DIR> "Directory to write I<k>.txt and P<k>.txt").value_parser(value_parser!(PathBuf)))
                .arg(arg!(--jobs <N> "Jobs per instance").value_parser(value_parser!(usize)))
                .arg(arg!(--machines <LIST> "Machines per stage, comma separated (e.g. 2,3,2)"))
                .arg(
                    arg!(--stages [N] "Number of stages; repeats a single --machines value")
                        .value_parser(value_parser!(usize)),
                )
                .arg(arg!(--count [N] "Number of instances").default_value("1").value_parser(value_parser!(usize)))
                .arg(arg!(--seed [SEED] "Random seed").default_value("42").value_parser(value_parser!(u64)))
                .arg(arg!(--"min-time" [T] "Minimum processing time").default_value("1").value_parser(value_parser!(u32)))
                .arg(arg!(--"max-time" [T] "Maximum processing time").default_value("99").value_parser(value_parser!(u32)))
                .arg(
                    arg!(--"machine-type" [TYPE] "identical | uniform | unrelated")
                        .default_value("unrelated")
                        .value_parser(value_parser!(MachineType)),
                ),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = cli().get_matches();
    let outcome = match matches.subcommand() {
        Some(("ga", sub_m)) => run_ga(sub_m),
        Some(("pso", sub_m)) => run_pso(sub_m),
        Some(("generate", sub_m)) => generate(sub_m),
        _ => Err(anyhow!("Invalid subcommand")),
    };
    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn parse_interval(value: &str) -> std::result::Result<Option<usize>, String> {
    if value.eq_ignore_ascii_case("inf") {
        return Ok(None);
    }
    match value.parse::<usize>() {
        Ok(0) => Err("must be positive or 'inf'".into()),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(e.to_string()),
    }
}

fn load_config<T: serde::de::DeserializeOwned + Default>(sub_m: &ArgMatches) -> Result<T> {
    match sub_m.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(T::default()),
    }
}

fn ga_config(sub_m: &ArgMatches) -> Result<GaConfig> {
    let mut config: GaConfig = load_config(sub_m)?;
    if let Some(&s) = sub_m.get_one::<Selection>("selection") {
        config = config.with_selection(s);
    }
    if let Some(&c) = sub_m.get_one::<Crossover>("crossover") {
        config = config.with_crossover(c);
    }
    if let Some(&m) = sub_m.get_one::<Mutation>("mutation") {
        config = config.with_mutation(m);
    }
    if let Some(&n) = sub_m.get_one::<usize>("popsize") {
        config = config.with_population_size(n);
    }
    if let Some(&p) = sub_m.get_one::<f64>("pc") {
        config = config.with_crossover_prob(p);
    }
    if let Some(&p) = sub_m.get_one::<f64>("pm") {
        config = config.with_mutation_prob(p);
    }
    if let Some(&r) = sub_m.get_one::<Option<usize>>("restart") {
        config = config.with_restart_generations(r);
    }
    let freq = sub_m
        .get_one::<Option<usize>>("lsfreq")
        .copied()
        .unwrap_or(config.local_search_freq);
    let intensity = sub_m
        .get_one::<usize>("lsintensity")
        .copied()
        .unwrap_or(config.local_search_intensity);
    config = config.with_local_search(freq, intensity);
    if let Some(&secs) = sub_m.get_one::<f64>("time") {
        config = config.with_time_limit_ms((secs * 1000.0) as u64);
    }
    if let Some(&n) = sub_m.get_one::<usize>("generations") {
        config = config.with_max_generations(n);
    }
    if let Some(&seed) = sub_m.get_one::<u64>("seed") {
        config = config.with_seed(seed);
    }
    config.validate().map_err(|e| anyhow!("invalid GA configuration: {e}"))?;
    Ok(config)
}

fn pso_config(sub_m: &ArgMatches) -> Result<PsoConfig> {
    let mut config: PsoConfig = load_config(sub_m)?;
    if let Some(&n) = sub_m.get_one::<usize>("popsize") {
        config = config.with_population_size(n);
    }
    if let Some(&n) = sub_m.get_one::<usize>("generations") {
        config = config.with_generations(n);
    }
    let c1 = sub_m.get_one::<f64>("c1").copied().unwrap_or(config.c1);
    let c2 = sub_m.get_one::<f64>("c2").copied().unwrap_or(config.c2);
    config = config.with_learning(c1, c2);
    if let Some(&p) = sub_m.get_one::<f64>("pm") {
        config = config.with_mutation_prob(p);
    }
    if let Some(&c) = sub_m.get_one::<PsoCrossover>("crossover") {
        config = config.with_crossover(c);
    }
    if let Some(&m) = sub_m.get_one::<PsoMutation>("mutation") {
        config = config.with_mutation(m);
    }
    if let Some(&k) = sub_m.get_one::<Option<usize>>("lsinterval") {
        config = config.with_local_search_interval(k);
    }
    if let Some(&seed) = sub_m.get_one::<u64>("seed") {
        config = config.with_seed(seed);
    }
    config.validate().map_err(|e| anyhow!("invalid PSO configuration: {e}"))?;
    Ok(config)
}

/// One instance of a batch: `I<k>.txt` and its optional `P<k>.txt`.
struct BatchItem {
    index: u64,
    instance: PathBuf,
    permutation: Option<PathBuf>,
}

impl BatchItem {
    fn name(&self) -> String {
        format!("I{}", self.index)
    }
}

/// Lists `I<k>.txt` files sorted by `k`.
fn collect_batch(instances: &Path, permutations: Option<&Path>) -> Result<Vec<BatchItem>> {
    let mut items = Vec::new();
    let entries =
        fs::read_dir(instances).with_context(|| format!("listing {}", instances.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(index) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix('I'))
            .and_then(|n| n.strip_suffix(".txt"))
            .and_then(|k| k.parse::<u64>().ok())
        else {
            continue;
        };
        let permutation = permutations.map(|dir| dir.join(format!("P{index}.txt")));
        items.push(BatchItem {
            index,
            instance: path,
            permutation,
        });
    }
    items.sort_by_key(|item| item.index);
    Ok(items)
}

/// Reads the seed for `item`, or `None` when it has no usable file.
fn load_seed(item: &BatchItem, problem: &Problem) -> Option<Vec<usize>> {
    let path = item.permutation.as_ref()?;
    if !path.exists() {
        warn!(instance = %item.name(), path = %path.display(), "seed permutation not found, running unseeded");
        return None;
    }
    match read_permutation(path).and_then(|seed| problem.check_permutation(&seed).map(|()| seed)) {
        Ok(seed) => Some(seed),
        Err(e) => {
            warn!(instance = %item.name(), error = %e, "unusable seed permutation, running unseeded");
            None
        }
    }
}

fn prepare_output(sub_m: &ArgMatches) -> Result<PathBuf> {
    let output = sub_m
        .get_one::<PathBuf>("output")
        .cloned()
        .ok_or_else(|| anyhow!("--output is required"))?;
    fs::create_dir_all(&output).with_context(|| format!("creating {}", output.display()))?;
    Ok(output)
}

fn batch_items(sub_m: &ArgMatches) -> Result<Vec<BatchItem>> {
    let instances = sub_m
        .get_one::<PathBuf>("instances")
        .ok_or_else(|| anyhow!("--instances is required"))?;
    let permutations = sub_m.get_one::<PathBuf>("permutations");
    let items = collect_batch(instances, permutations.map(PathBuf::as_path))?;
    if items.is_empty() {
        bail!("no I<k>.txt files in {}", instances.display());
    }
    Ok(items)
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn run_ga(sub_m: &ArgMatches) -> Result<()> {
    let config = ga_config(sub_m)?;
    let output = prepare_output(sub_m)?;
    let due_date = sub_m.get_one::<u32>("duedate").copied().unwrap_or(DEFAULT_DUE_DATE);
    let optimum = sub_m.get_one::<f64>("optimum").copied();
    let items = batch_items(sub_m)?;
    let label = format!(
        "{}|{}|{}|Pop:{}|Pc:{}|Pm:{}",
        config.selection,
        config.crossover,
        config.mutation,
        config.population_size,
        config.crossover_prob,
        config.mutation_prob
    );

    let total = items.len();
    let mut summaries = Vec::with_capacity(total);
    for (i, item) in items.iter().enumerate() {
        info!(instance = %item.name(), progress = %format!("{}/{total}", i + 1), "processing");
        let problem = match read_instance(&item.instance, due_date) {
            Ok(p) => p,
            Err(e) => {
                error!(instance = %item.name(), error = %e, "skipping instance");
                continue;
            }
        };

        let seed = load_seed(item, &problem);
        let run = match &seed {
            Some(seed) => GaRunner::run_with_seed(&problem, &config, seed),
            None => GaRunner::run(&problem, &config),
        };
        let result = match run {
            Ok(r) => r,
            Err(e) => {
                error!(instance = %item.name(), error = %e, "run failed");
                continue;
            }
        };

        let initial = match &seed {
            Some(seed) => decode(seed, &problem),
            None => result.fitness_history.first().copied().unwrap_or(result.best_fitness),
        };
        write_history_csv(
            output.join(format!("generations_{}.csv", item.name())),
            &result.history,
        )?;

        let mut summary = RunSummary::from_history(
            &result.history,
            result.generations,
            initial,
            result.best_fitness,
            result.elapsed,
        )
        .with_instance(item.name(), &problem)
        .with_population_size(config.population_size)
        .with_best_permutation(&result.best.permutation)
        .with_config(label.clone());
        if seed.is_some() {
            if let Some(name) = item.permutation.as_ref().and_then(|p| p.file_name()) {
                summary = summary.with_permutation_file(name.to_string_lossy());
            }
        }
        if let Some(opt) = optimum {
            summary = summary.with_optimum(opt);
        }
        info!(
            instance = %item.name(),
            initial,
            best = result.best_fitness,
            improvement_pct = summary.improvement_pct,
            generations = result.generations,
            restarts = result.restarts,
            "instance done"
        );
        summaries.push(summary);
    }

    let path = output.join(format!("summary_GA_{}.csv", timestamp()));
    write_summary_csv(&path, &summaries)?;
    info!(path = %path.display(), processed = summaries.len(), total, "summary written");
    Ok(())
}

fn run_pso(sub_m: &ArgMatches) -> Result<()> {
    let config = pso_config(sub_m)?;
    let output = prepare_output(sub_m)?;
    let due_date = sub_m.get_one::<u32>("duedate").copied().unwrap_or(DEFAULT_DUE_DATE);
    let optimum = sub_m.get_one::<f64>("optimum").copied();
    let items = batch_items(sub_m)?;
    let label = format!(
        "{}|{}|Pop:{}|C1:{}|C2:{}|Pm:{}",
        config.crossover,
        config.mutation,
        config.population_size,
        config.c1,
        config.c2,
        config.mutation_prob
    );

    let total = items.len();
    let mut summaries = Vec::with_capacity(total);
    for (i, item) in items.iter().enumerate() {
        info!(instance = %item.name(), progress = %format!("{}/{total}", i + 1), "processing");
        let problem = match read_instance(&item.instance, due_date) {
            Ok(p) => p,
            Err(e) => {
                error!(instance = %item.name(), error = %e, "skipping instance");
                continue;
            }
        };

        let seed = load_seed(item, &problem);
        let run = match &seed {
            Some(seed) => PsoRunner::run_with_seed(&problem, &config, seed),
            None => PsoRunner::run(&problem, &config),
        };
        let result = match run {
            Ok(r) => r,
            Err(e) => {
                error!(instance = %item.name(), error = %e, "run failed");
                continue;
            }
        };

        let initial = match &seed {
            Some(seed) => decode(seed, &problem),
            None => result.fitness_history.first().copied().unwrap_or(result.best_fitness),
        };
        write_history_csv(
            output.join(format!("generations_{}.csv", item.name())),
            &result.history,
        )?;

        let mut summary = RunSummary::from_history(
            &result.history,
            result.generations,
            initial,
            result.best_fitness,
            result.elapsed,
        )
        .with_instance(item.name(), &problem)
        .with_population_size(config.population_size)
        .with_best_permutation(&result.best_position)
        .with_config(label.clone());
        if seed.is_some() {
            if let Some(name) = item.permutation.as_ref().and_then(|p| p.file_name()) {
                summary = summary.with_permutation_file(name.to_string_lossy());
            }
        }
        if let Some(opt) = optimum {
            summary = summary.with_optimum(opt);
        }
        info!(
            instance = %item.name(),
            initial,
            best = result.best_fitness,
            improvement_pct = summary.improvement_pct,
            "instance done"
        );
        summaries.push(summary);
    }

    let path = output.join(format!("summary_PSO_{}.csv", timestamp()));
    write_summary_csv(&path, &summaries)?;
    info!(path = %path.display(), processed = summaries.len(), total, "summary written");
    Ok(())
}

fn generate(sub_m: &ArgMatches) -> Result<()> {
    let output = prepare_output(sub_m)?;
    let jobs = sub_m
        .get_one::<usize>("jobs")
        .copied()
        .ok_or_else(|| anyhow!("--jobs is required"))?;
    let list = sub_m
        .get_one::<String>("machines")
        .ok_or_else(|| anyhow!("--machines is required"))?;
    let mut machines = list
        .split(',')
        .map(|s| s.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid --machines '{list}'"))?;
    if let Some(&stages) = sub_m.get_one::<usize>("stages") {
        match machines.len() {
            1 => machines = vec![machines[0]; stages],
            n if n == stages => {}
            n => bail!("--stages {stages} does not match {n} machine counts"),
        }
    }

    let count = sub_m.get_one::<usize>("count").copied().unwrap_or(1);
    let seed = sub_m.get_one::<u64>("seed").copied().unwrap_or(42);
    let min_time = sub_m.get_one::<u32>("min-time").copied().unwrap_or(1);
    let max_time = sub_m.get_one::<u32>("max-time").copied().unwrap_or(99);
    let machine_type = sub_m
        .get_one::<MachineType>("machine-type")
        .copied()
        .unwrap_or_default();

    let mut generator = InstanceGenerator::new(seed)
        .with_time_range(min_time, max_time)
        .with_machine_type(machine_type);
    for k in 1..=count {
        let problem = generator.generate(jobs, &machines)?;
        let permutation = generator.initial_permutation(jobs);
        write_instance(output.join(format!("I{k}.txt")), &problem)?;
        write_permutation(output.join(format!("P{k}.txt")), &permutation)?;
    }
    info!(
        count,
        jobs,
        machines = ?machines,
        output = %output.display(),
        "instances generated"
    );
    Ok(())
}
