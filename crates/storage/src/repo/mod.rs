mod comments;
mod folders;
mod meta;
