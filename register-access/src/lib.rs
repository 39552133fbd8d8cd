#![cfg_attr(not(test), no_std)]

use device_descriptor::{ReadOnlyRegister, Register, RegisterWidthType};

pub trait RegisterAccess<RWT>
where
    RWT: RegisterWidthType,
{
    type Error;

    fn read_register<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RegisterWidth = RWT>;

    fn write_register<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>;

    /// Reads the register, applies `f` and writes the whole register back.
    ///
    /// If the read fails, nothing is written.
    fn modify_register<R>(
        &mut self,
        f: impl FnOnce(R::Writer) -> R::Writer,
    ) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>,
    {
        let reg = self.read_register::<R>()?;
        self.write_register(reg.modify(f))
    }
}

#[allow(async_fn_in_trait)]
pub trait AsyncRegisterAccess<RWT>
where
    RWT: RegisterWidthType,
{
    type Error;

    async fn read_register_async<R>(&mut self) -> Result<R, Self::Error>
    where
        R: ReadOnlyRegister<RegisterWidth = RWT>;

    async fn write_register_async<R>(&mut self, reg: R) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>;

    async fn modify_register_async<R>(
        &mut self,
        f: impl FnOnce(R::Writer) -> R::Writer,
    ) -> Result<(), Self::Error>
    where
        R: Register<RegisterWidth = RWT>,
    {
        let reg = self.read_register_async::<R>().await?;
        self.write_register_async(reg.modify(f)).await
    }
}
