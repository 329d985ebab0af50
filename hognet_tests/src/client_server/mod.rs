mod collision;
mod interpolation;
mod lifecycle;
mod prediction;
mod validation;
