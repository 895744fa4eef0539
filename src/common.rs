pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{info, warn};
pub use serde::{Deserialize, Serialize};
pub use std::{
    cmp::Ordering,
    collections::BTreeSet,
    env, fmt,
    fmt::Debug,
    fs,
    iter::FromIterator,
    ops::Range,
    path::{Path, PathBuf},
    sync::Arc,
};
pub use tch::{Kind, Tensor};
