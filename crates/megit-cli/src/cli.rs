use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "megit", about = "A minimal content-addressed version control system", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository, or reinitialize an existing one
    Init(InitArgs),
    /// Store a file as an object and print its id
    HashObject(HashObjectArgs),
    /// Print the payload of an object
    CatFile(CatFileArgs),
    /// Snapshot the index as a tree object
    WriteTree,
    /// Replace the working tree and index with a tree
    ReadTree(ReadTreeArgs),
    /// Stage files or directories
    Add(AddArgs),
    /// Record the index as a new commit
    Commit(CommitArgs),
    /// Show commit history
    Log(LogArgs),
    /// Show a commit and the changes it introduced
    Show(ShowArgs),
    /// Show changes in the working tree, or between two commits
    Diff(DiffArgs),
    /// Switch to a branch or detach at a commit
    Checkout(CheckoutArgs),
    /// Create a tag
    Tag(TagArgs),
    /// List branches, or create one
    Branch(BranchArgs),
    /// Show the working tree status
    Status,
    /// Merge a commit into HEAD
    Merge(MergeArgs),
    /// Print the best common ancestor of two commits
    MergeBase(MergeBaseArgs),
    /// Move HEAD to a commit without touching files
    Reset(ResetArgs),
    /// Copy branches of another local repository into tracking refs
    Fetch(FetchArgs),
    /// Publish a branch to another local repository
    Push(PushArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashObjectArgs {
    pub file: PathBuf,
    /// Object type to store the file as
    #[arg(short = 't', long = "type", default_value = "blob")]
    pub kind: String,
}

#[derive(Args)]
pub struct CatFileArgs {
    pub object: String,
    /// Fail unless the object has this type
    #[arg(short = 't', long = "type")]
    pub kind: Option<String>,
}

#[derive(Args)]
pub struct ReadTreeArgs {
    pub tree: String,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(default_value = "@")]
    pub commit: String,
    #[arg(long)]
    pub oneline: bool,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(default_value = "@")]
    pub commit: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// With two commits, compare their snapshots instead of the working tree
    #[arg(num_args = 0..=2)]
    pub commits: Vec<String>,
    /// Only list changed paths
    #[arg(long)]
    pub stat: bool,
}

#[derive(Args)]
pub struct CheckoutArgs {
    pub name: String,
}

#[derive(Args)]
pub struct TagArgs {
    pub name: String,
    #[arg(default_value = "@")]
    pub commit: String,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
    #[arg(default_value = "@")]
    pub start_point: String,
}

#[derive(Args)]
pub struct MergeArgs {
    pub commit: String,
}

#[derive(Args)]
pub struct MergeBaseArgs {
    pub first: String,
    pub second: String,
}

#[derive(Args)]
pub struct ResetArgs {
    pub commit: String,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Root of the repository to fetch from
    pub path: PathBuf,
    #[arg(long, default_value = "origin")]
    pub name: String,
}

#[derive(Args)]
pub struct PushArgs {
    /// Root of the repository to push to
    pub path: PathBuf,
    pub branch: String,
}
