pub mod readgroup_split;
